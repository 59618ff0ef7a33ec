use crate::{
    error::{AppError, AppResult},
    models::{alert_vote, Alert, AlertVote},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QuerySelect, Statement, TransactionTrait,
};

pub struct VoteService {
    db: DatabaseConnection,
}

/// A well-formed vote submission. Anything other than 1 / -1 is rejected
/// before any state is touched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoteValue {
    Up,
    Down,
}

impl VoteValue {
    pub fn from_raw(value: i16) -> AppResult<Self> {
        match value {
            1 => Ok(Self::Up),
            -1 => Ok(Self::Down),
            _ => Err(AppError::Validation(
                "Vote value must be 1 or -1".to_string(),
            )),
        }
    }

    fn is_upvote(self) -> bool {
        matches!(self, Self::Up)
    }
}

/// What happened to the (alert, user) vote row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowChange {
    /// First vote: insert a row with this upvote flag.
    Insert(bool),
    /// Switched sides: flip the existing row to this upvote flag.
    Flip(bool),
    /// Repeated the same vote: retract, delete the row.
    Delete,
}

/// Counter deltas implied by one vote transition. `owner_upvoted` applies
/// to the alert reporter's received-upvote tally, not the voter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VoteTransition {
    pub row: RowChange,
    pub positive: i32,
    pub negative: i32,
    pub owner_upvoted: i32,
}

/// The full toggle state machine over {none, upvote, downvote}.
pub fn transition(previous: Option<bool>, cast: VoteValue) -> VoteTransition {
    let up = cast.is_upvote();
    match previous {
        None => VoteTransition {
            row: RowChange::Insert(up),
            positive: if up { 1 } else { 0 },
            negative: if up { 0 } else { 1 },
            owner_upvoted: if up { 1 } else { 0 },
        },
        Some(prev) if prev == up => VoteTransition {
            row: RowChange::Delete,
            positive: if up { -1 } else { 0 },
            negative: if up { 0 } else { -1 },
            owner_upvoted: if up { -1 } else { 0 },
        },
        Some(_) => VoteTransition {
            row: RowChange::Flip(up),
            positive: if up { 1 } else { -1 },
            negative: if up { -1 } else { 1 },
            owner_upvoted: if up { 1 } else { -1 },
        },
    }
}

/// Resulting vote state and counters after a cast.
#[derive(Clone, Copy, Debug)]
pub struct VoteOutcome {
    /// 1 = upvoted, -1 = downvoted, 0 = no standing vote (retracted).
    pub value: i16,
    pub positive_votes: i32,
    pub negative_votes: i32,
}

impl VoteService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Apply one vote cast by `user_id` on `alert_id`. The alert row is
    /// locked for the duration so concurrent casts on the same alert
    /// serialize; the vote row, both alert counters and the owner counter
    /// commit or roll back together.
    pub async fn cast_vote(
        &self,
        alert_id: i32,
        user_id: i32,
        cast: VoteValue,
    ) -> AppResult<VoteOutcome> {
        let txn = self.db.begin().await?;

        let alert = Alert::find_by_id(alert_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(AppError::NotFound)?;

        let existing = AlertVote::find()
            .filter(alert_vote::Column::AlertId.eq(alert_id))
            .filter(alert_vote::Column::UserId.eq(user_id))
            .one(&txn)
            .await?;

        let change = transition(existing.as_ref().map(|v| v.vote), cast);

        match (change.row, existing) {
            (RowChange::Insert(up), _) => {
                let row = alert_vote::ActiveModel {
                    alert_id: sea_orm::ActiveValue::Set(alert_id),
                    user_id: sea_orm::ActiveValue::Set(user_id),
                    vote: sea_orm::ActiveValue::Set(up),
                    created_at: sea_orm::ActiveValue::Set(chrono::Utc::now().naive_utc()),
                    ..Default::default()
                };
                row.insert(&txn).await?;
            }
            (RowChange::Flip(up), Some(existing)) => {
                let mut active: alert_vote::ActiveModel = existing.into();
                active.vote = sea_orm::ActiveValue::Set(up);
                active.update(&txn).await?;
            }
            (RowChange::Delete, Some(existing)) => {
                AlertVote::delete_by_id(existing.id).exec(&txn).await?;
            }
            // transition() only emits Flip/Delete when a row exists.
            (RowChange::Flip(_), None) | (RowChange::Delete, None) => unreachable!(),
        }

        let positive_votes = (alert.positive_votes + change.positive).max(0);
        let negative_votes = (alert.negative_votes + change.negative).max(0);

        let mut active: crate::models::alert::ActiveModel = alert.clone().into();
        active.positive_votes = sea_orm::ActiveValue::Set(positive_votes);
        active.negative_votes = sea_orm::ActiveValue::Set(negative_votes);
        active.update(&txn).await?;

        if change.owner_upvoted != 0 {
            if let Some(owner_id) = alert.reported_by {
                txn.execute(Statement::from_sql_and_values(
                    sea_orm::DatabaseBackend::Postgres,
                    "UPDATE users SET alerts_upvoted = GREATEST(alerts_upvoted + $1, 0)
                     WHERE id = $2",
                    vec![change.owner_upvoted.into(), owner_id.into()],
                ))
                .await?;
            }
        }

        txn.commit().await?;

        let value = match change.row {
            RowChange::Insert(true) | RowChange::Flip(true) => 1,
            RowChange::Insert(false) | RowChange::Flip(false) => -1,
            RowChange::Delete => 0,
        };

        Ok(VoteOutcome {
            value,
            positive_votes,
            negative_votes,
        })
    }

    /// The caller's standing vote on an alert: 1, -1 or None.
    pub async fn user_vote(&self, alert_id: i32, user_id: i32) -> AppResult<Option<i16>> {
        let vote = AlertVote::find()
            .filter(alert_vote::Column::AlertId.eq(alert_id))
            .filter(alert_vote::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;
        Ok(vote.map(|v| if v.vote { 1 } else { -1 }))
    }
}
