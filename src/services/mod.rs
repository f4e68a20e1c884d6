pub mod acceptance;
pub mod checkout;
pub mod webhook;

pub use acceptance::{AcceptanceToken, AcceptanceTokenError, AcceptanceTokenFetcher, Sleeper, TokioSleeper};
pub use checkout::{SubmittedTransaction, TransactionSubmitter};
pub use webhook::{WebhookOutcome, WebhookProcessor};
