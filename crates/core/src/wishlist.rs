//! Saved-for-later product list.

use serde::{Deserialize, Serialize};

use crate::{Price, ProductId};

/// Current version of the persisted wishlist blob.
pub const WISHLIST_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistItem {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    #[serde(default)]
    pub image: Option<String>,
}

/// Products the shopper has saved, unique by id, in the order they were saved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Wishlist {
    items: Vec<WishlistItem>,
}

impl Wishlist {
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build from stored items, keeping the first occurrence of each id.
    #[must_use]
    pub fn from_items(items: impl IntoIterator<Item = WishlistItem>) -> Self {
        let mut list = Self::new();
        for item in items {
            list.add(item);
        }
        list
    }

    #[must_use]
    pub fn items(&self) -> &[WishlistItem] {
        &self.items
    }

    #[must_use]
    pub fn contains(&self, id: &ProductId) -> bool {
        self.items.iter().any(|item| &item.id == id)
    }

    /// Save an item. Already-saved ids are left as they are.
    pub fn add(&mut self, item: WishlistItem) {
        if !self.contains(&item.id) {
            self.items.push(item);
        }
    }

    pub fn remove(&mut self, id: &ProductId) {
        self.items.retain(|item| &item.id != id);
    }

    /// Add the item if absent, remove it if present. Returns whether the item
    /// is saved afterwards.
    pub fn toggle(&mut self, item: WishlistItem) -> bool {
        if self.contains(&item.id) {
            self.remove(&item.id);
            false
        } else {
            self.items.push(item);
            true
        }
    }
}

/// Why a stored wishlist blob could not be read.
#[derive(Debug, thiserror::Error)]
pub enum WishlistDecodeError {
    #[error("wishlist blob is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("unsupported wishlist format version {0}")]
    UnsupportedVersion(u32),
}

#[derive(Serialize)]
struct StoredWishlistRef<'a> {
    version: u32,
    items: &'a [WishlistItem],
}

#[derive(Deserialize)]
struct StoredWishlist {
    #[serde(default = "current_version")]
    version: u32,
    items: Vec<WishlistItem>,
}

const fn current_version() -> u32 {
    WISHLIST_FORMAT_VERSION
}

/// Encoder/decoder between [`Wishlist`] and its stored string form,
/// `{"version":1,"items":[...]}`.
pub struct WishlistCodec;

impl WishlistCodec {
    /// # Errors
    ///
    /// Returns an error only if serialization itself fails.
    pub fn encode(list: &Wishlist) -> Result<String, serde_json::Error> {
        serde_json::to_string(&StoredWishlistRef {
            version: WISHLIST_FORMAT_VERSION,
            items: list.items(),
        })
    }

    /// # Errors
    ///
    /// Returns [`WishlistDecodeError::Malformed`] for anything that is not a
    /// wishlist blob and [`WishlistDecodeError::UnsupportedVersion`] for one
    /// written by a newer format.
    pub fn decode(raw: &str) -> Result<Wishlist, WishlistDecodeError> {
        let stored: StoredWishlist = serde_json::from_str(raw)?;
        if stored.version > WISHLIST_FORMAT_VERSION {
            return Err(WishlistDecodeError::UnsupportedVersion(stored.version));
        }
        Ok(Wishlist::from_items(stored.items))
    }
}
