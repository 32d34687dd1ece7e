//! Menu items of the side bar.

use crate::models::MenuItem;

use super::Resource;

/// Menu items have no separate list representation.
pub type MenuItems = Resource<MenuItem, MenuItem>;
