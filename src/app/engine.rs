//! The aggregation engine: one handler per event kind.
//!
//! Handlers mutate the working store handed to them by the ledger and assume
//! nothing about persistence: if any step fails, the ledger discards the
//! whole working copy, so no handler needs compensation logic. Business
//! rules (timelines, quotas, fee math, beta schedules) are enforced by the
//! upstream producer; handlers only record what events tell them, and fail
//! loudly when the record would contradict itself.

use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::config::WindowsConfig;
use crate::domain::amount;
use crate::domain::{
    AggregateCounter, AggregateId, Category, CategoryId, Entity, EventEnvelope, IntegrityError,
    LedgerEvent, Opponent, OpponentId, Outcome, OutcomeId, OutcomeTimeslot, PaymentToken,
    QuotaAdjustment, ResolutionType, ResultSource, ResultSourceId, ResultUpdateAction,
    Subcategory, SubcategoryId, TokenAddress, TokenId, TransferRecord, TransferRecordId, User,
    UserId, UserOutcome, UserOutcomeId, UserOutcomeTimeslot, UserOutcomeTimeslotId, VirtualFloor,
    VirtualFloorCreation, VirtualFloorId, VirtualFloorState,
};
use crate::error::{Error, Result};
use crate::port::metadata::MetadataDecoder;
use crate::port::token::TokenMetadataSource;

use super::store::EntityStore;

/// Apply one event to the working store.
pub(crate) fn apply_event<D: MetadataDecoder, S: TokenMetadataSource>(
    store: &mut EntityStore,
    envelope: &EventEnvelope,
    decoder: &D,
    tokens: &S,
    windows: &WindowsConfig,
) -> Result<()> {
    match &envelope.payload {
        LedgerEvent::PaymentTokenWhitelistUpdate { token, whitelisted } => {
            payment_token_whitelist_update(store, tokens, token, *whitelisted)
        }
        LedgerEvent::VirtualFloorCreation(creation) => {
            virtual_floor_creation(store, decoder, windows, envelope, creation)
        }
        LedgerEvent::UserCommitment {
            virtual_floor_id,
            outcome_index,
            committer,
            token_id,
            timeslot,
            amount,
            beta_e18,
        } => user_commitment(
            store,
            envelope,
            virtual_floor_id,
            *outcome_index,
            committer,
            token_id,
            *timeslot,
            *amount,
            *beta_e18,
        ),
        LedgerEvent::TransferSingle {
            from,
            to,
            token_id,
            value,
        } => transfer(store, envelope, from, to, &[token_id.clone()], &[*value]),
        LedgerEvent::TransferBatch {
            from,
            to,
            token_ids,
            values,
        } => transfer(store, envelope, from, to, token_ids, values),
        LedgerEvent::VirtualFloorCancellationUnresolvable { virtual_floor_id } => cancellation(
            store,
            virtual_floor_id,
            VirtualFloorState::ClaimableRefundsResolvableNever,
            None,
        ),
        LedgerEvent::VirtualFloorCancellationFlagged {
            virtual_floor_id,
            reason,
        } => cancellation(
            store,
            virtual_floor_id,
            VirtualFloorState::ClaimableRefundsFlagged,
            Some(reason.clone()),
        ),
        LedgerEvent::VirtualFloorResolution {
            virtual_floor_id,
            winning_outcome_index,
            resolution_type,
            winner_profits,
        } => resolution(
            store,
            virtual_floor_id,
            *winning_outcome_index,
            *resolution_type,
            *winner_profits,
        ),
        LedgerEvent::CreationQuotaAdjustments { adjustments } => {
            creation_quota_adjustments(store, adjustments)
        }
        LedgerEvent::ResultUpdate {
            virtual_floor_id,
            operator,
            action,
            outcome_index,
        } => result_update(
            store,
            windows,
            envelope,
            virtual_floor_id,
            operator,
            *action,
            *outcome_index,
        ),
    }
}

/// Whichever way the flag flips, the event is only used to discover payment
/// tokens that may later back virtual floors. Metadata is read once, at
/// first sighting; the flag itself is not stored.
fn payment_token_whitelist_update<S: TokenMetadataSource>(
    store: &mut EntityStore,
    tokens: &S,
    token: &TokenAddress,
    whitelisted: bool,
) -> Result<()> {
    if store.get::<PaymentToken>(token).is_none() {
        let metadata = tokens.read(token)?;
        info!(token = %token, symbol = %metadata.symbol, "registered payment token");
        store.create_new(PaymentToken {
            address: token.clone(),
            name: metadata.name,
            symbol: metadata.symbol,
            decimals: metadata.decimals,
        })?;
    }
    debug!(token = %token, whitelisted, "payment token whitelist update");
    Ok(())
}

fn virtual_floor_creation<D: MetadataDecoder>(
    store: &mut EntityStore,
    decoder: &D,
    windows: &WindowsConfig,
    envelope: &EventEnvelope,
    creation: &VirtualFloorCreation,
) -> Result<()> {
    let vf_id = creation.virtual_floor_id.clone();

    let metadata = decoder.decode(&creation.metadata)?;
    if metadata.outcomes.len() != usize::from(creation.n_outcomes) {
        return Err(IntegrityError::OutcomeCountMismatch {
            virtual_floor: vf_id,
            declared: creation.n_outcomes,
            decoded: metadata.outcomes.len(),
        }
        .into());
    }

    {
        let (aggregate, _) =
            store.load_or_create(AggregateId::singleton(), AggregateCounter::singleton);
        aggregate.total_virtual_floors_created += 1;
    }

    let category_id = CategoryId::from(metadata.category.clone());
    store.load_or_create(category_id.clone(), || Category {
        id: category_id.clone(),
    });
    let subcategory_id = SubcategoryId::new(category_id, metadata.subcategory.clone());
    store.load_or_create(subcategory_id.clone(), || Subcategory {
        id: subcategory_id.clone(),
    });

    // The upstream engine rejects floors backed by a token that was never
    // whitelisted, so the PaymentToken row must already exist here.
    let decimals = store.get_existent::<PaymentToken>(&creation.payment_token)?.decimals;
    let bonus_amount = amount::from_token_units(creation.bonus_amount, decimals)?;

    store.create_new(VirtualFloor {
        id: vf_id.clone(),
        owner: creation.creator.clone(),
        payment_token: creation.payment_token.clone(),
        subcategory: subcategory_id,
        title: metadata.title,
        description: metadata.description,
        is_listed: metadata.is_listed,
        discord_channel_id: metadata.discord_channel_id,
        beta_open: amount::from_fixed_e18(creation.beta_open_e18)?,
        creation_fee_rate: amount::from_fixed_e18(creation.creation_fee_rate_e18)?,
        platform_fee_rate: amount::from_fixed_e18(creation.platform_fee_rate_e18)?,
        t_created: envelope.timestamp,
        t_open: creation.t_open,
        t_close: creation.t_close,
        t_resolve: creation.t_resolve,
        t_result_set_min: creation.t_resolve,
        t_result_set_max: creation.t_resolve + windows.result_set_secs,
        t_result_challenge_max: None,
        state: VirtualFloorState::ActiveResultNone,
        winning_outcome: None,
        winner_profits: None,
        challenger: None,
        flagging_reason: None,
        total_supply: bonus_amount,
        bonus_amount,
        min_commitment_amount: amount::from_token_units(creation.min_commitment_amount, decimals)?,
        max_commitment_amount: amount::from_token_units(creation.max_commitment_amount, decimals)?,
    })?;

    adjust_concurrent_virtual_floors(store, &creation.creator, 1);

    for (index, opponent) in metadata.opponents.iter().enumerate() {
        store.create_new(Opponent {
            id: OpponentId {
                virtual_floor: vf_id.clone(),
                index: index as u32,
            },
            title: opponent.title.clone(),
            image: opponent.image.clone(),
        })?;
    }

    for (index, result_source) in metadata.result_sources.iter().enumerate() {
        store.create_new(ResultSource {
            id: ResultSourceId {
                virtual_floor: vf_id.clone(),
                index: index as u32,
            },
            title: result_source.title.clone(),
            url: result_source.url.clone(),
        })?;
    }

    for (index, outcome) in metadata.outcomes.iter().enumerate() {
        store.create_new(Outcome::new(
            OutcomeId::new(vf_id.clone(), index as u8),
            outcome.title.clone(),
        ))?;
    }

    info!(
        virtual_floor = %vf_id,
        owner = %creation.creator,
        outcomes = creation.n_outcomes,
        bonus = %bonus_amount,
        "virtual floor created"
    );
    Ok(())
}

/// The mint path. Balance updates happen here rather than in the transfer
/// handler of the same transaction, which skips mints to avoid counting the
/// commitment twice.
#[allow(clippy::too_many_arguments)]
fn user_commitment(
    store: &mut EntityStore,
    envelope: &EventEnvelope,
    virtual_floor_id: &VirtualFloorId,
    outcome_index: u8,
    committer: &UserId,
    token_id: &TokenId,
    timeslot: u64,
    raw_amount: u128,
    beta_e18: u128,
) -> Result<()> {
    let outcome_id = OutcomeId::new(virtual_floor_id.clone(), outcome_index);
    store.get_existent::<Outcome>(&outcome_id)?;

    let beta = amount::from_fixed_e18(beta_e18)?;
    ensure_outcome_timeslot(store, token_id, &outcome_id, timeslot, beta)?;

    let zero = UserId::zero();
    store.load_or_create(zero.clone(), || User::new(zero.clone()));
    let committer_id = committer.clone();
    store.load_or_create(committer_id.clone(), || User::new(committer_id.clone()));

    apply_transfers(
        store,
        envelope,
        &UserId::zero(),
        committer,
        &[token_id.clone()],
        &[raw_amount],
    )
}

/// Get-or-create the timeslot row; on re-sighting, its immutable fields must
/// match exactly what was stored. A mismatch is never an update.
fn ensure_outcome_timeslot(
    store: &mut EntityStore,
    token_id: &TokenId,
    outcome: &OutcomeId,
    timeslot: u64,
    beta: Decimal,
) -> Result<()> {
    if let Some(existing) = store.get::<OutcomeTimeslot>(token_id) {
        let mismatch = |field: &'static str, stored: String, incoming: String| {
            Error::from(IntegrityError::FieldMismatch {
                kind: OutcomeTimeslot::KIND,
                id: token_id.to_string(),
                field,
                stored,
                incoming,
            })
        };
        if &existing.outcome != outcome {
            return Err(mismatch(
                "outcome",
                existing.outcome.to_string(),
                outcome.to_string(),
            ));
        }
        if existing.timeslot != timeslot {
            return Err(mismatch(
                "timeslot",
                existing.timeslot.to_string(),
                timeslot.to_string(),
            ));
        }
        if existing.beta != beta {
            return Err(mismatch(
                "beta",
                existing.beta.to_string(),
                beta.to_string(),
            ));
        }
        return Ok(());
    }

    store.create_new(OutcomeTimeslot {
        token_id: token_id.clone(),
        outcome: outcome.clone(),
        timeslot,
        beta,
        total_supply: Decimal::ZERO,
    })?;
    Ok(())
}

/// Transfer path. Mints are skipped entirely: the commitment event of the
/// same transaction has already credited the hierarchy.
fn transfer(
    store: &mut EntityStore,
    envelope: &EventEnvelope,
    from: &UserId,
    to: &UserId,
    token_ids: &[TokenId],
    values: &[u128],
) -> Result<()> {
    if from.is_zero() {
        debug!(to = %to, "skipping mint transfer already handled by commitment");
        return Ok(());
    }
    apply_transfers(store, envelope, from, to, token_ids, values)
}

fn apply_transfers(
    store: &mut EntityStore,
    envelope: &EventEnvelope,
    from: &UserId,
    to: &UserId,
    token_ids: &[TokenId],
    values: &[u128],
) -> Result<()> {
    if token_ids.len() != values.len() {
        return Err(IntegrityError::TransferArityMismatch {
            ids: token_ids.len(),
            values: values.len(),
        }
        .into());
    }

    let is_mint = from.is_zero();

    for (pair_index, (token_id, value)) in token_ids.iter().zip(values).enumerate() {
        // An unknown token id means the event log contradicts itself.
        let (outcome_id, beta) = {
            let timeslot = store.get_existent::<OutcomeTimeslot>(token_id)?;
            (timeslot.outcome.clone(), timeslot.beta)
        };
        let vf_id = outcome_id.virtual_floor.clone();
        let token_address = store.get_existent::<VirtualFloor>(&vf_id)?.payment_token.clone();
        let decimals = store.get_existent::<PaymentToken>(&token_address)?.decimals;
        let amount = amount::from_token_units(*value, decimals)?;

        if !is_mint {
            credit_entity_hierarchy(store, &vf_id, &outcome_id, token_id, from, -amount, beta)?;
        }

        // Credit `to` even when it is the burn address: the balance does not
        // perish, it changes ownership to the sink, so every total above it
        // stays conserved.
        credit_entity_hierarchy(store, &vf_id, &outcome_id, token_id, to, amount, beta)?;

        store.create_new(TransferRecord {
            id: TransferRecordId {
                token_id: token_id.clone(),
                tx_hash: envelope.tx_hash.clone(),
                log_index: envelope.log_index,
                pair_index: pair_index as u32,
            },
            from: from.clone(),
            to: to.clone(),
            timestamp: envelope.timestamp,
            amount,
        })?;
    }
    Ok(())
}

/// The propagation primitive: apply a signed amount to every level of the
/// hierarchy, and its beta-weighted counterpart to the weighted aggregates.
/// Invoked once per mint and twice per transfer (debit then credit), so
/// paired invocations always net to zero.
fn credit_entity_hierarchy(
    store: &mut EntityStore,
    vf_id: &VirtualFloorId,
    outcome_id: &OutcomeId,
    token_id: &TokenId,
    user: &UserId,
    amount: Decimal,
    beta: Decimal,
) -> Result<()> {
    // Weighted with the beta recorded at the timeslot, never recomputed.
    let weighted = amount::weighted(amount, beta)?;

    store.load_existent::<VirtualFloor>(vf_id)?.total_supply += amount;

    {
        let outcome = store.load_existent::<Outcome>(outcome_id)?;
        outcome.total_supply += amount;
        outcome.total_weighted_supply += weighted;
    }

    store.load_existent::<OutcomeTimeslot>(token_id)?.total_supply += amount;

    let user_id = user.clone();
    store.load_or_create(user_id.clone(), || User::new(user_id.clone()));

    {
        let id = UserOutcomeId::new(outcome_id.clone(), user.clone());
        let (user_outcome, _) = store.load_or_create(id.clone(), || UserOutcome::new(id.clone()));
        user_outcome.total_balance += amount;
        user_outcome.total_weighted_balance += weighted;
    }

    {
        let id = UserOutcomeTimeslotId::new(token_id.clone(), user.clone());
        let (row, _) = store.load_or_create(id.clone(), || {
            UserOutcomeTimeslot::new(id.clone(), outcome_id.clone())
        });
        row.balance += amount;
    }

    debug!(user = %user, token_id = %token_id, %amount, %weighted, "hierarchy credit");
    Ok(())
}

fn cancellation(
    store: &mut EntityStore,
    virtual_floor_id: &VirtualFloorId,
    target: VirtualFloorState,
    flagging_reason: Option<String>,
) -> Result<()> {
    let owner = store.get_existent::<VirtualFloor>(virtual_floor_id)?.owner.clone();
    adjust_concurrent_virtual_floors(store, &owner, -1);

    let vf = store.load_existent::<VirtualFloor>(virtual_floor_id)?;
    vf.transition_to(target)?;
    if flagging_reason.is_some() {
        vf.flagging_reason = flagging_reason;
    }

    info!(virtual_floor = %virtual_floor_id, state = %target, "virtual floor cancelled");
    Ok(())
}

fn resolution(
    store: &mut EntityStore,
    virtual_floor_id: &VirtualFloorId,
    winning_outcome_index: u8,
    resolution_type: ResolutionType,
    raw_winner_profits: u128,
) -> Result<()> {
    let (owner, token_address) = {
        let vf = store.get_existent::<VirtualFloor>(virtual_floor_id)?;
        (vf.owner.clone(), vf.payment_token.clone())
    };
    adjust_concurrent_virtual_floors(store, &owner, -1);

    let decimals = store.get_existent::<PaymentToken>(&token_address)?.decimals;
    let winner_profits = amount::from_token_units(raw_winner_profits, decimals)?;

    let target = match resolution_type {
        ResolutionType::Winners => VirtualFloorState::ClaimablePayouts,
        ResolutionType::NoWinners => VirtualFloorState::ClaimableRefundsResolvedNoWinners,
    };

    let vf = store.load_existent::<VirtualFloor>(virtual_floor_id)?;
    vf.winning_outcome = Some(OutcomeId::new(
        virtual_floor_id.clone(),
        winning_outcome_index,
    ));
    vf.winner_profits = Some(winner_profits);
    vf.transition_to(target)?;

    info!(
        virtual_floor = %virtual_floor_id,
        winning_outcome = winning_outcome_index,
        state = %target,
        %winner_profits,
        "virtual floor resolved"
    );
    Ok(())
}

/// Quota bounds are enforced upstream; this only records the running total.
fn creation_quota_adjustments(
    store: &mut EntityStore,
    adjustments: &[QuotaAdjustment],
) -> Result<()> {
    for adjustment in adjustments {
        let id = adjustment.creator.clone();
        let (user, _) = store.load_or_create(id.clone(), || User::new(id.clone()));
        user.max_concurrent_virtual_floors += adjustment.relative_amount;
    }
    Ok(())
}

fn result_update(
    store: &mut EntityStore,
    windows: &WindowsConfig,
    envelope: &EventEnvelope,
    virtual_floor_id: &VirtualFloorId,
    operator: &UserId,
    action: ResultUpdateAction,
    outcome_index: u8,
) -> Result<()> {
    if action == ResultUpdateAction::SomeoneChallengedSetResult {
        let challenger = operator.clone();
        store.load_or_create(challenger.clone(), || User::new(challenger.clone()));
    }

    let vf = store.load_existent::<VirtualFloor>(virtual_floor_id)?;
    vf.winning_outcome = Some(OutcomeId::new(virtual_floor_id.clone(), outcome_index));

    match action {
        ResultUpdateAction::CreatorSetResult => {
            vf.transition_to(VirtualFloorState::ActiveResultSet)?;
            vf.t_result_challenge_max = Some(envelope.timestamp + windows.challenge_secs);
        }
        ResultUpdateAction::SomeoneChallengedSetResult => {
            vf.transition_to(VirtualFloorState::ActiveResultChallenged)?;
            vf.challenger = Some(operator.clone());
        }
        // Each finalization action is accompanied, in the same processing
        // unit, by a resolution or cancellation event that performs the
        // terminal transition; transitioning here would apply it twice.
        ResultUpdateAction::AdminFinalizedUnsetResult
        | ResultUpdateAction::SomeoneConfirmedUnchallengedResult
        | ResultUpdateAction::AdminFinalizedChallenge => {}
    }

    debug!(virtual_floor = %virtual_floor_id, ?action, outcome_index, "result update");
    Ok(())
}

fn adjust_concurrent_virtual_floors(store: &mut EntityStore, user: &UserId, adjustment: i64) {
    let id = user.clone();
    let (user, _) = store.load_or_create(id.clone(), || User::new(id.clone()));
    user.concurrent_virtual_floors += adjustment;
}
