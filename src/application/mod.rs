//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Following CQRS, it separates command handlers (write) from query handlers (read).

pub mod handlers;

pub use handlers::credits::{
    CompleteCreditPurchaseCommand, CompleteCreditPurchaseHandler, GetCreditBalanceHandler,
    GetCreditHistoryHandler, ListCreditPackagesHandler, PurchaseCreditsCommand,
    PurchaseCreditsHandler, PurchaseFulfiller,
};
pub use handlers::payments::{
    CancelSubscriptionHandler, CompletePaymentCommand, CompletePaymentHandler,
    CreateCheckoutCommand, CreateCheckoutHandler, GetPaymentHistoryHandler,
    GetSubscriptionHandler, HandlePaymentWebhookCommand, HandlePaymentWebhookHandler,
    PreviewPlanChangeHandler, ProductCatalog, SubscriptionActivator,
};
pub use handlers::tasks::{
    EnhancementProviders, GetTaskStatusHandler, ListTasksHandler, SubmitEnhancementCommand,
    SubmitEnhancementHandler,
};
