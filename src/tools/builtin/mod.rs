//! Built-in tools bundled with the agent runtime.

pub mod browser;

pub use browser::BrowserTool;
pub use browser::find_chrome_binary as find_chrome;
