//! Recording operator verdicts on addresses and phones.

use std::time::Instant;

use opentelemetry::KeyValue;
use tracing::{Instrument, info};

use super::{Desk, finish, lock_owned_session};
use crate::db;
use crate::error::{Error, Result};
use crate::event::EventKind;
use crate::model::OperatorId;
use crate::model::provider::SubRecordRef;
use crate::model::session::SessionId;
use crate::model::validation::ValidationUpdate;
use crate::telemetry::metrics;
use crate::telemetry::session::{record_session, start_desk_span};

impl Desk {
    /// Apply a batch of verdicts and new sub-records to the session's provider.
    ///
    /// All or nothing: a decision naming a sub-record of another provider
    /// fails with [`Error::SubRecordNotFound`] and nothing is written.
    /// Resubmitting a verdict overwrites the earlier one.
    pub async fn record_validation(
        &self,
        session: SessionId,
        operator: OperatorId,
        update: ValidationUpdate,
    ) -> Result<()> {
        let span = start_desk_span("record_validation", operator);
        record_session(&span, session);
        let started = Instant::now();
        let result = self
            .try_record_validation(session, operator, update.normalized())
            .instrument(span.clone())
            .await;
        finish("record_validation", &span, started, result)
    }

    async fn try_record_validation(
        &self,
        id: SessionId,
        operator: OperatorId,
        update: ValidationUpdate,
    ) -> Result<()> {
        let mut tx = self.db.begin().await?;
        let session = lock_owned_session(&mut *tx, id, operator).await?;
        let provider = session.provider_id;
        let now = self.clock.now();

        for d in &update.addresses {
            let found = db::provider::apply_address_decision(
                &mut *tx,
                provider,
                d.id,
                &d.decision,
                operator,
                now,
            )
            .await?;
            if !found {
                return Err(Error::SubRecordNotFound(SubRecordRef::Address(d.id)));
            }
        }

        for d in &update.phones {
            let found =
                db::provider::apply_phone_decision(&mut *tx, provider, d.id, &d.decision, operator, now)
                    .await?;
            if !found {
                return Err(Error::SubRecordNotFound(SubRecordRef::Phone(d.id)));
            }
        }

        for new in &update.new_addresses {
            db::provider::insert_address(&mut *tx, provider, self.ids.next_uuid(), new, operator, now)
                .await?;
        }
        for new in &update.new_phones {
            db::provider::insert_phone(&mut *tx, provider, self.ids.next_uuid(), new, operator, now)
                .await?;
        }

        db::event::record(
            &mut *tx,
            id,
            operator,
            now,
            &EventKind::ValidationRecorded {
                addresses: update.addresses.len(),
                phones: update.phones.len(),
                new_addresses: update.new_addresses.len(),
                new_phones: update.new_phones.len(),
            },
        )
        .await?;
        tx.commit().await?;

        let counter = metrics::validations();
        for (kind, n) in [
            ("address", update.addresses.len()),
            ("phone", update.phones.len()),
            ("new_address", update.new_addresses.len()),
            ("new_phone", update.new_phones.len()),
        ] {
            if n > 0 {
                counter.add(n as u64, &[KeyValue::new("kind", kind)]);
            }
        }

        info!(
            session_id = id.0,
            provider_id = provider.0,
            addresses = update.addresses.len(),
            phones = update.phones.len(),
            new_addresses = update.new_addresses.len(),
            new_phones = update.new_phones.len(),
            "validation recorded"
        );
        Ok(())
    }
}
