//! Exclusive assignment of providers to operators.

use std::time::Instant;

use opentelemetry::KeyValue;
use tracing::{Instrument, Span, debug, info};

use super::{Assignment, Desk, finish, linkage};
use crate::db;
use crate::error::{Error, Result};
use crate::event::EventKind;
use crate::model::OperatorId;
use crate::telemetry::metrics;
use crate::telemetry::session::{record_session, start_desk_span};

/// How many times a claim is re-selected after a concurrent claimer wins
/// the commit race for the same provider.
pub const MAX_CLAIM_ROUNDS: u32 = 5;

impl Desk {
    /// Hand the operator a provider to verify.
    ///
    /// An operator who already holds an open session gets it back. Otherwise
    /// one assignable provider is locked and a new session opened for it; two
    /// concurrent callers never receive the same provider.
    pub async fn assign(&self, operator: OperatorId) -> Result<Assignment> {
        let span = start_desk_span("assign", operator);
        let started = Instant::now();
        let result = self.try_assign(operator, &span).instrument(span.clone()).await;
        finish("assign", &span, started, result)
    }

    async fn try_assign(&self, operator: OperatorId, span: &Span) -> Result<Assignment> {
        let mut tx = self.db.begin().await?;
        let now = self.clock.now();

        let mut claimed = None;
        for round in 1..=MAX_CLAIM_ROUNDS {
            if let Some(session) = db::session::find_open_for_operator(&mut *tx, operator).await? {
                claimed = Some((session, true));
                break;
            }

            let Some(provider) = db::provider::claim_candidate(&mut *tx).await? else {
                break;
            };

            let uuid = self.ids.next_uuid();
            match db::session::insert_if_free(&mut *tx, uuid, provider.id, operator, now).await? {
                Some(session) => {
                    db::event::record(
                        &mut *tx,
                        session.id,
                        operator,
                        now,
                        &EventKind::SessionOpened {
                            provider_id: provider.id,
                        },
                    )
                    .await?;
                    claimed = Some((session, false));
                    break;
                }
                None => {
                    debug!(
                        round,
                        provider_id = provider.id.0,
                        "session insert absorbed by a concurrent claim, reselecting"
                    );
                }
            }
        }

        let Some((session, resumed)) = claimed else {
            metrics::assignments().add(1, &[KeyValue::new("result", "empty")]);
            return Err(Error::NoWorkAvailable);
        };
        record_session(span, session.id);

        let provider = db::provider::get(&mut *tx, session.provider_id).await?;
        let addresses = db::provider::list_addresses(&mut *tx, provider.id).await?;
        let phones = db::provider::list_phones(&mut *tx, provider.id).await?;
        tx.commit().await?;

        let pairs = linkage::pair(&addresses, &phones);

        let result = if resumed { "resumed" } else { "new" };
        metrics::assignments().add(1, &[KeyValue::new("result", result)]);
        info!(
            session_id = session.id.0,
            provider_id = provider.id.0,
            addresses = addresses.len(),
            phones = phones.len(),
            resumed,
            "provider assigned"
        );

        Ok(Assignment {
            provider,
            session,
            addresses,
            phones,
            pairs,
            resumed,
        })
    }
}
