//! Provider and sub-record queries.
//!
//! Every function takes the caller's connection so it participates in the
//! engine's transaction.

use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::model::OperatorId;
use crate::model::provider::*;
use crate::model::validation::{Decision, NewAddress, NewPhone};

/// Per-provider sub-record tallies used by the completion gate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubRecordCounts {
    pub total_addresses: i64,
    pub validated_addresses: i64,
    pub total_phones: i64,
    pub validated_phones: i64,
}

impl SubRecordCounts {
    pub fn total(&self) -> i64 {
        self.total_addresses + self.total_phones
    }

    pub fn validated(&self) -> i64 {
        self.validated_addresses + self.validated_phones
    }

    pub fn unvalidated(&self) -> i64 {
        self.total() - self.validated()
    }
}

/// Get a provider by id.
pub async fn get(conn: &mut PgConnection, id: ProviderId) -> Result<Provider> {
    let row: Option<ProviderRow> = sqlx::query_as(
        "SELECT id, uuid, npi, gnpi, provider_name, specialty, provider_group, metadata, is_active, created_at, updated_at
         FROM providers WHERE id = $1",
    )
    .bind(id.0)
    .fetch_optional(&mut *conn)
    .await?;

    row.map(Provider::from)
        .ok_or_else(|| Error::Other(format!("provider {id} not found")))
}

/// Pick one assignable provider and lock its row, skipping rows another
/// transaction already holds.
///
/// Assignable means active, at least one unvalidated address or phone, and
/// no open session. Ties are broken randomly.
pub async fn claim_candidate(conn: &mut PgConnection) -> Result<Option<Provider>> {
    let row: Option<ProviderRow> = sqlx::query_as(
        "SELECT p.id, p.uuid, p.npi, p.gnpi, p.provider_name, p.specialty, p.provider_group,
                p.metadata, p.is_active, p.created_at, p.updated_at
         FROM providers p
         WHERE p.is_active
           AND NOT EXISTS (
               SELECT 1 FROM validation_sessions vs
               WHERE vs.provider_id = p.id AND vs.status = 'in_progress')
           AND (EXISTS (
                    SELECT 1 FROM provider_addresses pa
                    WHERE pa.provider_id = p.id AND pa.is_correct IS NULL)
                OR EXISTS (
                    SELECT 1 FROM provider_phones pp
                    WHERE pp.provider_id = p.id AND pp.is_correct IS NULL))
         ORDER BY random()
         LIMIT 1
         FOR UPDATE OF p SKIP LOCKED",
    )
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.map(Provider::from))
}

/// How many providers are assignable right now (ignores row locks).
pub async fn count_assignable(conn: &mut PgConnection) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*)
         FROM providers p
         WHERE p.is_active
           AND NOT EXISTS (
               SELECT 1 FROM validation_sessions vs
               WHERE vs.provider_id = p.id AND vs.status = 'in_progress')
           AND (EXISTS (
                    SELECT 1 FROM provider_addresses pa
                    WHERE pa.provider_id = p.id AND pa.is_correct IS NULL)
                OR EXISTS (
                    SELECT 1 FROM provider_phones pp
                    WHERE pp.provider_id = p.id AND pp.is_correct IS NULL))",
    )
    .fetch_one(&mut *conn)
    .await?;
    Ok(count)
}

/// All addresses for a provider, in presentation order.
pub async fn list_addresses(conn: &mut PgConnection, provider: ProviderId) -> Result<Vec<Address>> {
    let rows: Vec<AddressRow> = sqlx::query_as(
        "SELECT id, uuid, provider_id, address_category, address1, address2, city, state, zip,
                country, link_key, is_correct, corrected_address1, corrected_address2,
                corrected_city, corrected_state, corrected_zip, validated_by, validated_at,
                created_at
         FROM provider_addresses
         WHERE provider_id = $1
         ORDER BY address_category, created_at, id",
    )
    .bind(provider.0)
    .fetch_all(&mut *conn)
    .await?;

    rows.into_iter().map(AddressRow::try_into_address).collect()
}

/// All phones for a provider, in load order.
pub async fn list_phones(conn: &mut PgConnection, provider: ProviderId) -> Result<Vec<Phone>> {
    let rows: Vec<PhoneRow> = sqlx::query_as(
        "SELECT id, uuid, provider_id, phone, phone_type, extension, link_key, is_correct,
                corrected_phone, validated_by, validated_at, created_at
         FROM provider_phones
         WHERE provider_id = $1
         ORDER BY created_at, id",
    )
    .bind(provider.0)
    .fetch_all(&mut *conn)
    .await?;

    rows.into_iter().map(PhoneRow::try_into_phone).collect()
}

/// Count total and validated sub-records under a provider.
pub async fn counts(conn: &mut PgConnection, provider: ProviderId) -> Result<SubRecordCounts> {
    let (total_addresses, validated_addresses, total_phones, validated_phones): (
        i64,
        i64,
        i64,
        i64,
    ) = sqlx::query_as(
        "SELECT
            (SELECT COUNT(*) FROM provider_addresses WHERE provider_id = $1),
            (SELECT COUNT(*) FROM provider_addresses WHERE provider_id = $1 AND is_correct IS NOT NULL),
            (SELECT COUNT(*) FROM provider_phones WHERE provider_id = $1),
            (SELECT COUNT(*) FROM provider_phones WHERE provider_id = $1 AND is_correct IS NOT NULL)",
    )
    .bind(provider.0)
    .fetch_one(&mut *conn)
    .await?;

    Ok(SubRecordCounts {
        total_addresses,
        validated_addresses,
        total_phones,
        validated_phones,
    })
}

/// Record an operator's verdict on one address of `provider`.
///
/// Returns `false` if no such address belongs to the provider.
pub async fn apply_address_decision(
    conn: &mut PgConnection,
    provider: ProviderId,
    id: AddressId,
    decision: &Decision<AddressCorrection>,
    operator: OperatorId,
    now: DateTime<Utc>,
) -> Result<bool> {
    let empty = AddressCorrection::default();
    let (is_correct, c) = match decision {
        Decision::Correct => (true, &empty),
        Decision::Incorrect(c) => (false, c),
    };

    let rows_affected = sqlx::query(
        "UPDATE provider_addresses
         SET is_correct = $1,
             corrected_address1 = $2, corrected_address2 = $3, corrected_city = $4,
             corrected_state = $5, corrected_zip = $6,
             validated_by = $7, validated_at = $8, updated_at = $8
         WHERE id = $9 AND provider_id = $10",
    )
    .bind(is_correct)
    .bind(&c.address1)
    .bind(&c.address2)
    .bind(&c.city)
    .bind(&c.state)
    .bind(&c.zip)
    .bind(operator.0)
    .bind(now)
    .bind(id.0)
    .bind(provider.0)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    Ok(rows_affected > 0)
}

/// Record an operator's verdict on one phone of `provider`.
///
/// Returns `false` if no such phone belongs to the provider.
pub async fn apply_phone_decision(
    conn: &mut PgConnection,
    provider: ProviderId,
    id: PhoneId,
    decision: &Decision<PhoneCorrection>,
    operator: OperatorId,
    now: DateTime<Utc>,
) -> Result<bool> {
    let (is_correct, corrected) = match decision {
        Decision::Correct => (true, None),
        Decision::Incorrect(c) => (false, c.number.as_deref()),
    };

    let rows_affected = sqlx::query(
        "UPDATE provider_phones
         SET is_correct = $1, corrected_phone = $2,
             validated_by = $3, validated_at = $4, updated_at = $4
         WHERE id = $5 AND provider_id = $6",
    )
    .bind(is_correct)
    .bind(corrected)
    .bind(operator.0)
    .bind(now)
    .bind(id.0)
    .bind(provider.0)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    Ok(rows_affected > 0)
}

/// Insert an address found during a session, already validated as correct.
pub async fn insert_address(
    conn: &mut PgConnection,
    provider: ProviderId,
    uuid: Uuid,
    new: &NewAddress,
    operator: OperatorId,
    now: DateTime<Utc>,
) -> Result<AddressId> {
    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO provider_addresses
            (uuid, provider_id, address_category, address1, address2, city, state, zip,
             is_correct, validated_by, validated_at, created_by, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, true, $9, $10, $9, $10, $10)
         RETURNING id",
    )
    .bind(uuid)
    .bind(provider.0)
    .bind(&new.category)
    .bind(&new.address1)
    .bind(&new.address2)
    .bind(&new.city)
    .bind(&new.state)
    .bind(&new.zip)
    .bind(operator.0)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;
    Ok(AddressId(id))
}

/// Insert a phone found during a session, already validated as correct.
pub async fn insert_phone(
    conn: &mut PgConnection,
    provider: ProviderId,
    uuid: Uuid,
    new: &NewPhone,
    operator: OperatorId,
    now: DateTime<Utc>,
) -> Result<PhoneId> {
    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO provider_phones
            (uuid, provider_id, phone, phone_type, extension,
             is_correct, validated_by, validated_at, created_by, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, true, $6, $7, $6, $7, $7)
         RETURNING id",
    )
    .bind(uuid)
    .bind(provider.0)
    .bind(&new.number)
    .bind(&new.phone_type)
    .bind(&new.extension)
    .bind(operator.0)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;
    Ok(PhoneId(id))
}

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

#[derive(sqlx::FromRow)]
struct ProviderRow {
    id: i64,
    uuid: Uuid,
    npi: String,
    gnpi: Option<String>,
    provider_name: String,
    specialty: Option<String>,
    provider_group: Option<String>,
    metadata: serde_json::Value,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProviderRow> for Provider {
    fn from(row: ProviderRow) -> Self {
        Self {
            id: ProviderId(row.id),
            uuid: row.uuid,
            npi: row.npi,
            gnpi: row.gnpi,
            name: row.provider_name,
            specialty: row.specialty,
            group: row.provider_group,
            metadata: row.metadata,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AddressRow {
    id: i64,
    uuid: Uuid,
    provider_id: i64,
    address_category: String,
    address1: String,
    address2: Option<String>,
    city: Option<String>,
    state: Option<String>,
    zip: Option<String>,
    country: String,
    link_key: Option<String>,
    is_correct: Option<bool>,
    corrected_address1: Option<String>,
    corrected_address2: Option<String>,
    corrected_city: Option<String>,
    corrected_state: Option<String>,
    corrected_zip: Option<String>,
    validated_by: Option<i64>,
    validated_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl AddressRow {
    fn try_into_address(self) -> Result<Address> {
        let corrections = AddressCorrection {
            address1: self.corrected_address1,
            address2: self.corrected_address2,
            city: self.corrected_city,
            state: self.corrected_state,
            zip: self.corrected_zip,
        };
        Ok(Address {
            id: AddressId(self.id),
            uuid: self.uuid,
            provider_id: ProviderId(self.provider_id),
            category: self.address_category,
            address1: self.address1,
            address2: self.address2,
            city: self.city,
            state: self.state,
            zip: self.zip,
            country: self.country,
            link_key: self.link_key,
            validation: Validation::from_columns(
                self.is_correct,
                self.validated_by,
                self.validated_at,
                corrections,
            )?,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PhoneRow {
    id: i64,
    uuid: Uuid,
    provider_id: i64,
    phone: String,
    phone_type: String,
    extension: Option<String>,
    link_key: Option<String>,
    is_correct: Option<bool>,
    corrected_phone: Option<String>,
    validated_by: Option<i64>,
    validated_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl PhoneRow {
    fn try_into_phone(self) -> Result<Phone> {
        Ok(Phone {
            id: PhoneId(self.id),
            uuid: self.uuid,
            provider_id: ProviderId(self.provider_id),
            number: self.phone,
            phone_type: self.phone_type,
            extension: self.extension,
            link_key: self.link_key,
            validation: Validation::from_columns(
                self.is_correct,
                self.validated_by,
                self.validated_at,
                PhoneCorrection {
                    number: self.corrected_phone,
                },
            )?,
            created_at: self.created_at,
        })
    }
}
