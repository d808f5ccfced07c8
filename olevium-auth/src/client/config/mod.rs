mod settings;

pub use settings::{CookieSettings, RouteSettings, Settings};
