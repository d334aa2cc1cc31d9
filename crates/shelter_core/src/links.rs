//! Navigation link descriptors attached to presented records.
//!
//! Pure functions of the record; nothing here touches storage.
//!
//! Links are transport-neutral descriptors: `href` is a resource path, not a
//! route of any particular server, and `rel` names the ledger operation it
//! leads to. The CLI prints them as-is. A transport that serves these paths
//! maps them to operations as follows:
//!
//! | rel          | href                         | operation                          |
//! |--------------|------------------------------|------------------------------------|
//! | `self`       | `/occupancy/{id}`            | `LedgerService::get_record`        |
//! | `checkout`   | `/occupancy/{id}/checkout`   | `LedgerService::check_out`         |
//! | `self`       | `/shelters/{id}`             | `ShelterService::get`              |
//! | `occupants`  | `/shelters/{id}/occupancy`   | `LedgerService::list_active_by_shelter` |
//! | `checkin`    | `/shelters/{id}/checkin`     | `LedgerService::check_in`          |
//! | `self`       | `/resources/{id}`            | `ResourceService::get`             |
//! | `adjust`     | `/resources/{id}/quantity`   | `ResourceService::adjust_quantity` |
//! | `self`       | `/alerts/{id}`               | `AlertService::get`                |
//! | `set_status` | `/alerts/{id}/status`        | `AlertService::set_status`         |

use crate::model::alert::Alert;
use crate::model::occupancy::OccupancyRecord;
use crate::model::resource::Resource;
use crate::model::shelter::Shelter;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub href: String,
    pub rel: &'static str,
    pub method: &'static str,
}

impl Link {
    fn new(href: String, rel: &'static str, method: &'static str) -> Self {
        Self { href, rel, method }
    }
}

/// `self` always; `checkout` only while the stay is active.
pub fn record_links(record: &OccupancyRecord) -> Vec<Link> {
    let href = format!("/occupancy/{}", record.id);
    let mut links = vec![Link::new(href.clone(), "self", "GET")];
    if record.is_active() {
        links.push(Link::new(format!("{href}/checkout"), "checkout", "PUT"));
    }
    links
}

/// `self` always; `occupants` while active; `checkin` while active with a free bed.
pub fn shelter_links(shelter: &Shelter) -> Vec<Link> {
    let href = format!("/shelters/{}", shelter.id);
    let mut links = vec![Link::new(href.clone(), "self", "GET")];
    if shelter.is_active {
        links.push(Link::new(format!("{href}/occupancy"), "occupants", "GET"));
        if !shelter.is_full() {
            links.push(Link::new(format!("{href}/checkin"), "checkin", "POST"));
        }
    }
    links
}

pub fn resource_links(resource: &Resource) -> Vec<Link> {
    let href = format!("/resources/{}", resource.id);
    vec![
        Link::new(href.clone(), "self", "GET"),
        Link::new(format!("{href}/quantity"), "adjust", "PATCH"),
    ]
}

pub fn alert_links(alert: &Alert) -> Vec<Link> {
    let href = format!("/alerts/{}", alert.id);
    vec![
        Link::new(href.clone(), "self", "GET"),
        Link::new(format!("{href}/status"), "set_status", "PUT"),
    ]
}
