//! CLI command implementations.
//!
//! | Module      | Commands handled |
//! |-------------|------------------|
//! | `run`       | `Run`            |
//! | `bootstrap` | `Bootstrap`      |

pub mod bootstrap;
pub mod run;

pub use bootstrap::cmd_bootstrap;
pub use run::cmd_run;
