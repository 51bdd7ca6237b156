use crate::error::AppResult;
use crate::models::AuctionId;
use url::Url;

/// In-app path of an auction's live screen
pub fn auction_path(id: &AuctionId) -> String {
    format!("/auctions/{}", id)
}

/// Resolves deep links against the worker's registration scope
#[derive(Debug, Clone)]
pub struct DeepLinkResolver {
    scope: Url,
}

impl DeepLinkResolver {
    pub fn new(scope: &str) -> AppResult<Self> {
        let mut scope = Url::parse(scope)?;
        if !scope.path().ends_with('/') {
            let path = format!("{}/", scope.path());
            scope.set_path(&path);
        }
        Ok(Self { scope })
    }

    pub fn scope(&self) -> &Url {
        &self.scope
    }

    /// Resolve a relative or absolute link to an absolute URL
    pub fn resolve(&self, link: &str) -> AppResult<Url> {
        Ok(self.scope.join(link)?)
    }

    pub fn in_scope(&self, url: &Url) -> bool {
        url.origin() == self.scope.origin() && url.path().starts_with(self.scope.path())
    }

    /// Same as [`in_scope`](Self::in_scope) for an unparsed URL; anything
    /// unparseable is out of scope.
    pub fn in_scope_str(&self, url: &str) -> bool {
        Url::parse(url).map(|u| self.in_scope(&u)).unwrap_or(false)
    }
}
