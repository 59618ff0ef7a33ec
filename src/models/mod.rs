pub mod alert;
pub mod alert_vote;
pub mod hazard;
pub mod hazard_detail;
pub mod user;

pub use alert::{Entity as Alert, Model as AlertModel};
pub use alert_vote::{Entity as AlertVote, Model as AlertVoteModel};
pub use hazard::{HazardDetails, HazardKind};
pub use hazard_detail::{Entity as HazardDetail, Model as HazardDetailModel};
pub use user::{Entity as User, Model as UserModel};
