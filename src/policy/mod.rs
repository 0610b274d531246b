pub mod differ;
pub mod presets;
pub mod region;
pub mod schema;

pub use differ::{build_policy_diff, diff_policies, ChangeType, PolicyDiff, RuleChange};
pub use presets::PolicyPreset;
pub use region::Region;
pub use schema::{
    ConditionalLtvRule, DsrCeiling, FitFactor, LoanType, OwnershipStatus, PolicyError,
    PolicyTable, PriceCapRule, RegionStatus, ScoringModel, StressRule, VerdictTier,
};
