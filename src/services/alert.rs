use crate::{
    error::{AppError, AppResult},
    models::{
        alert, hazard, hazard_detail, Alert, AlertModel, HazardDetail, HazardDetails, HazardKind,
        User, UserModel,
    },
    response::PageMeta,
    services::permission,
};
use sea_orm::{
    sea_query::{extension::postgres::PgExpr, Expr},
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Statement, TransactionTrait,
};
use std::collections::HashMap;

pub const MAX_EFFECT_RADIUS_M: i64 = 100_000;
pub const DEFAULT_PAGE_SIZE: u64 = 4;

pub struct AlertService {
    db: DatabaseConnection,
}

/// A validated report submission, hazard payload already parsed.
#[derive(Debug, Clone)]
pub struct NewAlert {
    pub description: String,
    pub longitude: f64,
    pub latitude: f64,
    pub effect_radius: Option<i64>,
    pub source_url: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub county: Option<String>,
    pub hazard: Option<HazardDetails>,
}

/// Partial edit; absent fields keep their stored values. A present
/// `hazard` replaces the linked detail payload wholesale.
#[derive(Debug, Clone, Default)]
pub struct AlertChanges {
    pub description: Option<String>,
    pub effect_radius: Option<i64>,
    pub source_url: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub county: Option<String>,
    pub hazard: Option<HazardDetails>,
}

#[derive(Debug, Clone, Default)]
pub struct AlertFilter {
    pub active_only: bool,
    pub search: Option<String>,
}

/// Reject radii outside [0, 100000] meters; pass absent through so the
/// registry default applies.
pub fn validate_effect_radius(radius: Option<i64>) -> AppResult<Option<i32>> {
    match radius {
        None => Ok(None),
        Some(r) if (0..=MAX_EFFECT_RADIUS_M).contains(&r) => Ok(Some(r as i32)),
        Some(_) => Err(AppError::Validation(
            "The radius of effect must be between 0 and 100,000 meters".to_string(),
        )),
    }
}

/// Expiry is recomputed only when a submitted hazard kind differs from the
/// stored one. Unrelated edits must not postpone expiry.
pub fn expiry_needs_reset(stored: Option<HazardKind>, submitted: Option<HazardKind>) -> bool {
    matches!(submitted, Some(kind) if stored != Some(kind))
}

fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

impl AlertService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<AlertModel> {
        Alert::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Persist a new alert together with its hazard detail record and the
    /// reporter's created-count bump. All-or-nothing: a failed detail
    /// insert leaves no alert behind.
    pub async fn create(&self, reporter_id: i32, input: NewAlert) -> AppResult<AlertModel> {
        let radius = validate_effect_radius(input.effect_radius)?;
        let kind = input.hazard.as_ref().map(HazardDetails::kind);
        let now = chrono::Utc::now().naive_utc();

        let txn = self.db.begin().await?;

        let detail_id = match &input.hazard {
            Some(details) => {
                let row = hazard_detail::ActiveModel {
                    kind: sea_orm::ActiveValue::Set(details.kind().as_str().to_string()),
                    data: sea_orm::ActiveValue::Set(serialize_details(details)?),
                    created_at: sea_orm::ActiveValue::Set(now),
                    ..Default::default()
                };
                Some(row.insert(&txn).await?.id)
            }
            None => None,
        };

        let new_alert = alert::ActiveModel {
            description: sea_orm::ActiveValue::Set(input.description),
            longitude: sea_orm::ActiveValue::Set(input.longitude),
            latitude: sea_orm::ActiveValue::Set(input.latitude),
            effect_radius: sea_orm::ActiveValue::Set(
                radius.unwrap_or_else(|| hazard::default_radius_m(kind)),
            ),
            country: sea_orm::ActiveValue::Set(input.country),
            city: sea_orm::ActiveValue::Set(input.city),
            county: sea_orm::ActiveValue::Set(input.county),
            reported_by: sea_orm::ActiveValue::Set(Some(reporter_id)),
            source_url: sea_orm::ActiveValue::Set(input.source_url),
            positive_votes: sea_orm::ActiveValue::Set(0),
            negative_votes: sea_orm::ActiveValue::Set(0),
            hazard_kind: sea_orm::ActiveValue::Set(kind.map(|k| k.as_str().to_string())),
            hazard_detail_id: sea_orm::ActiveValue::Set(detail_id),
            soft_deletion_time: sea_orm::ActiveValue::Set(hazard::expiry_from(now, kind)),
            is_active: sea_orm::ActiveValue::Set(true),
            created_at: sea_orm::ActiveValue::Set(now),
            updated_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };

        let alert = new_alert.insert(&txn).await?;

        txn.execute(Statement::from_sql_and_values(
            sea_orm::DatabaseBackend::Postgres,
            "UPDATE users SET alerts_created = alerts_created + 1 WHERE id = $1",
            vec![reporter_id.into()],
        ))
        .await?;

        txn.commit().await?;
        Ok(alert)
    }

    /// Apply an edit. The expiry timestamp is preserved unless the hazard
    /// kind actually changes.
    pub async fn update(
        &self,
        id: i32,
        actor: &UserModel,
        changes: AlertChanges,
    ) -> AppResult<AlertModel> {
        let existing = self.get_by_id(id).await?;
        if !permission::can_edit_alert(actor, &existing) {
            return Err(AppError::Forbidden);
        }

        let radius = validate_effect_radius(changes.effect_radius)?;
        let submitted_kind = changes.hazard.as_ref().map(HazardDetails::kind);
        let reset_expiry = expiry_needs_reset(existing.kind(), submitted_kind);
        let now = chrono::Utc::now().naive_utc();

        let txn = self.db.begin().await?;

        let mut detail_id = existing.hazard_detail_id;
        if let Some(details) = &changes.hazard {
            let data = serialize_details(details)?;
            // Tolerate a dangling detail reference: recreate instead of
            // failing the edit.
            let stored = match detail_id {
                Some(existing_id) => HazardDetail::find_by_id(existing_id).one(&txn).await?,
                None => None,
            };
            match stored {
                Some(row) => {
                    let mut active: hazard_detail::ActiveModel = row.into();
                    active.kind =
                        sea_orm::ActiveValue::Set(details.kind().as_str().to_string());
                    active.data = sea_orm::ActiveValue::Set(data);
                    active.update(&txn).await?;
                }
                None => {
                    let row = hazard_detail::ActiveModel {
                        kind: sea_orm::ActiveValue::Set(details.kind().as_str().to_string()),
                        data: sea_orm::ActiveValue::Set(data),
                        created_at: sea_orm::ActiveValue::Set(now),
                        ..Default::default()
                    };
                    detail_id = Some(row.insert(&txn).await?.id);
                }
            }
        }

        let mut active: alert::ActiveModel = existing.into();
        if let Some(description) = changes.description {
            active.description = sea_orm::ActiveValue::Set(description);
        }
        if let Some(radius) = radius {
            active.effect_radius = sea_orm::ActiveValue::Set(radius);
        }
        if let Some(source_url) = changes.source_url {
            active.source_url = sea_orm::ActiveValue::Set(Some(source_url));
        }
        if let Some(country) = changes.country {
            active.country = sea_orm::ActiveValue::Set(Some(country));
        }
        if let Some(city) = changes.city {
            active.city = sea_orm::ActiveValue::Set(Some(city));
        }
        if let Some(county) = changes.county {
            active.county = sea_orm::ActiveValue::Set(Some(county));
        }
        if let Some(kind) = submitted_kind {
            active.hazard_kind = sea_orm::ActiveValue::Set(Some(kind.as_str().to_string()));
            active.hazard_detail_id = sea_orm::ActiveValue::Set(detail_id);
        }
        if reset_expiry {
            active.soft_deletion_time =
                sea_orm::ActiveValue::Set(hazard::expiry_from(now, submitted_kind));
        }
        active.updated_at = sea_orm::ActiveValue::Set(now);

        let updated = active.update(&txn).await?;
        txn.commit().await?;
        Ok(updated)
    }

    /// Soft-delete: flips is_active off. Calling it on an already archived
    /// alert is a no-op.
    pub async fn archive(&self, id: i32, actor: &UserModel) -> AppResult<AlertModel> {
        let existing = self.get_by_id(id).await?;
        if !permission::can_archive_alert(actor) {
            return Err(AppError::Forbidden);
        }
        if !existing.is_active {
            return Ok(existing);
        }

        let mut active: alert::ActiveModel = existing.into();
        active.is_active = sea_orm::ActiveValue::Set(false);
        active.updated_at = sea_orm::ActiveValue::Set(chrono::Utc::now().naive_utc());
        Ok(active.update(&self.db).await?)
    }

    /// Hard delete. Removes the hazard detail record first; tolerates the
    /// detail row already being gone.
    pub async fn delete(&self, id: i32, actor: &UserModel) -> AppResult<()> {
        let existing = self.get_by_id(id).await?;
        if !permission::can_delete_alert(actor, &existing) {
            return Err(AppError::Forbidden);
        }

        let txn = self.db.begin().await?;
        if let Some(detail_id) = existing.hazard_detail_id {
            HazardDetail::delete_many()
                .filter(hazard_detail::Column::Id.eq(detail_id))
                .exec(&txn)
                .await?;
        }
        Alert::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;
        Ok(())
    }

    /// Archive every active alert whose expiry has passed. One set-based
    /// conditional update, so concurrent sweeps cannot race or
    /// double-count; returns the number of alerts archived.
    pub async fn sweep_expired(&self, now: chrono::NaiveDateTime) -> AppResult<u64> {
        let result = self
            .db
            .execute(Statement::from_sql_and_values(
                sea_orm::DatabaseBackend::Postgres,
                "UPDATE alerts SET is_active = FALSE
                 WHERE is_active = TRUE AND soft_deletion_time <= $1",
                vec![now.into()],
            ))
            .await?;
        Ok(result.rows_affected())
    }

    /// Paginated listing, newest first (id breaks creation-time ties).
    /// The search term matches case-insensitively against description,
    /// hazard kind, country, city and county.
    pub async fn list(
        &self,
        filter: &AlertFilter,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<AlertModel>, PageMeta)> {
        let mut select = Alert::find();
        if filter.active_only {
            select = select.filter(alert::Column::IsActive.eq(true));
        }
        if let Some(term) = filter.search.as_deref().filter(|t| !t.trim().is_empty()) {
            let pattern = format!("%{}%", escape_like(term.trim()));
            select = select.filter(
                Condition::any()
                    .add(Expr::col(alert::Column::Description).ilike(pattern.clone()))
                    .add(Expr::col(alert::Column::HazardKind).ilike(pattern.clone()))
                    .add(Expr::col(alert::Column::Country).ilike(pattern.clone()))
                    .add(Expr::col(alert::Column::City).ilike(pattern.clone()))
                    .add(Expr::col(alert::Column::County).ilike(pattern)),
            );
        }

        let paginator = select
            .order_by_desc(alert::Column::CreatedAt)
            .order_by_desc(alert::Column::Id)
            .paginate(&self.db, per_page.max(1));

        let num_pages = paginator.num_pages().await?;
        let meta = PageMeta::resolve(page, num_pages);
        let alerts = paginator.fetch_page(meta.fetch_index()).await?;
        Ok((alerts, meta))
    }

    /// Every active alert, newest first, for the map export.
    pub async fn list_active(&self) -> AppResult<Vec<AlertModel>> {
        Ok(Alert::find()
            .filter(alert::Column::IsActive.eq(true))
            .order_by_desc(alert::Column::CreatedAt)
            .order_by_desc(alert::Column::Id)
            .all(&self.db)
            .await?)
    }

    /// Batch-fetch hazard payloads for a page of alerts, keyed by alert id.
    pub async fn hazard_details_for(
        &self,
        alerts: &[AlertModel],
    ) -> AppResult<HashMap<i32, HazardDetails>> {
        let detail_ids: Vec<i32> = alerts.iter().filter_map(|a| a.hazard_detail_id).collect();
        if detail_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = HazardDetail::find()
            .filter(hazard_detail::Column::Id.is_in(detail_ids))
            .all(&self.db)
            .await?;

        let by_detail_id: HashMap<i32, HazardDetails> = rows
            .iter()
            .filter_map(|row| row.details().map(|d| (row.id, d)))
            .collect();

        Ok(alerts
            .iter()
            .filter_map(|a| {
                let detail_id = a.hazard_detail_id?;
                by_detail_id.get(&detail_id).map(|d| (a.id, d.clone()))
            })
            .collect())
    }

    /// Batch-fetch reporter usernames for a page of alerts, keyed by
    /// user id.
    pub async fn reporter_names_for(
        &self,
        alerts: &[AlertModel],
    ) -> AppResult<HashMap<i32, String>> {
        let user_ids: Vec<i32> = alerts.iter().filter_map(|a| a.reported_by).collect();
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let users = User::find()
            .filter(crate::models::user::Column::Id.is_in(user_ids))
            .all(&self.db)
            .await?;
        Ok(users.into_iter().map(|u| (u.id, u.username)).collect())
    }
}

fn serialize_details(details: &HazardDetails) -> AppResult<serde_json::Value> {
    serde_json::to_value(details)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to encode hazard details: {e}")))
}
