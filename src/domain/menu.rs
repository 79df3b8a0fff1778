//! Menu read-model: stations route tickets, courses group kitchen timing,
//! items are what a draft line item references. This crate has no menu
//! authoring API at all — catalog management (pricing rules, seasonal
//! availability, station/course assignment) stays with the external
//! system that owns the menu of record; this module only reads what that
//! system has already written.

use crate::ids::{KitchenCourseId, MenuItemId, MenuStationId};
use crate::money::Money;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuStation {
    pub id: MenuStationId,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KitchenCourse {
    pub id: KitchenCourseId,
    pub name: String,
    pub sequence: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: MenuItemId,
    pub name: String,
    pub price: Money,
    pub station_id: MenuStationId,
    pub course_id: Option<KitchenCourseId>,
    pub is_active: bool,
}
