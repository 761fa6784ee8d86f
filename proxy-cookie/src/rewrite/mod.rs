pub mod chain;
pub mod prefix;
pub mod rule;

pub use chain::RewriteChain;
pub use prefix::prefix_path;
pub use rule::RewriteRule;
