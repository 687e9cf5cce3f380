//! Opens the authorization page for the user

use crate::output::{print_info, print_link};
use omniout_sdk::{CrmResult, Navigator};
use tracing::warn;
use url::Url;

/// Prints the authorization URL and, unless disabled, opens it in a browser
///
/// A browser that fails to launch is not fatal: the printed URL can be
/// opened by hand.
#[derive(Debug, Clone, Copy)]
pub struct BrowserNavigator {
    open_browser: bool,
}

impl BrowserNavigator {
    pub fn new(open_browser: bool) -> Self {
        Self { open_browser }
    }
}

impl Navigator for BrowserNavigator {
    fn navigate(&self, url: &Url) -> CrmResult<()> {
        print_link("Sign in at", url.as_str());

        if self.open_browser {
            if let Err(e) = webbrowser::open(url.as_str()) {
                warn!("Failed to open browser: {}", e);
                print_info("Browser didn't open? Use the URL above to sign in.");
            }
        }

        Ok(())
    }
}
