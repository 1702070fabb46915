mod settings;

pub use settings::{MailConfig, Settings, StoreConfig};
