//! Typed models for the portal's read endpoints.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A resource served by a fixed backend read path.
pub trait PortalResource: DeserializeOwned {
    /// Path the resource is read from.
    const PATH: &'static str;
}

/// Headline city statistics (`/api/city-stats`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityStats {
    /// Traffic congestion, e.g. `32%`
    pub congestion_level: String,
    /// Air quality index
    pub air_quality: String,
    /// Mean emergency response time in minutes
    pub emergency_response_time: String,
    /// Visitors currently in the city
    pub active_visitors: String,
}

impl PortalResource for CityStats {
    const PATH: &'static str = "/api/city-stats";
}

/// Severity of an emergency alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    /// Immediate danger
    Danger,
    /// Advisory warning
    Warning,
    /// Public notice
    Info,
    /// A level this client does not know
    #[serde(other)]
    Unknown,
}

/// An emergency alert (`/api/emergency-alerts`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyAlert {
    /// Alert id
    pub id: i64,
    /// Short title
    pub title: String,
    /// Relative time, e.g. `12m ago`
    pub time: String,
    /// Full description
    pub description: String,
    /// Severity
    #[serde(rename = "type")]
    pub level: AlertLevel,
}

impl PortalResource for Vec<EmergencyAlert> {
    const PATH: &'static str = "/api/emergency-alerts";
}

/// A city service offered through the portal (`/api/services`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityService {
    /// Service id
    pub id: i64,
    /// Service name
    pub name: String,
    /// Description
    pub description: String,
    /// Icon name
    pub icon: String,
    /// Theme color name
    pub color: String,
    /// Availability
    pub status: String,
}

impl PortalResource for Vec<CityService> {
    const PATH: &'static str = "/api/services";
}

/// A recent activity record (`/api/activities`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    /// Activity id
    pub id: i64,
    /// Originating service
    pub service: String,
    /// Icon name
    pub icon: String,
    /// Theme color name
    pub color: String,
    /// Status label
    pub status: String,
    /// Theme color of the status label
    pub status_color: String,
    /// Relative time
    pub time: String,
    /// Details
    pub details: String,
}

impl PortalResource for Vec<Activity> {
    const PATH: &'static str = "/api/activities";
}

/// A reported traffic incident.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficIncident {
    /// Incident id
    pub id: i64,
    /// Kind of incident, e.g. `Accident`
    #[serde(rename = "type")]
    pub kind: String,
    /// Location description
    pub location: String,
    /// Severity label
    pub severity: String,
    /// Time of report
    pub reported_time: String,
    /// Current status
    pub status: String,
}

/// Hourly traffic volume sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficFlowPoint {
    /// Hour label, e.g. `6 AM`
    pub time: String,
    /// Vehicle count
    pub volume: u64,
}

/// Traffic overview (`/api/traffic`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficReport {
    /// Congestion per district
    pub congestion: BTreeMap<String, String>,
    /// Open incidents
    #[serde(default)]
    pub incidents: Vec<TrafficIncident>,
    /// Volume samples over the day
    #[serde(default)]
    pub traffic_flow_data: Vec<TrafficFlowPoint>,
}

impl PortalResource for TrafficReport {
    const PATH: &'static str = "/api/traffic";
}

/// Public identity of another portal user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    /// User id
    pub id: i64,
    /// Login handle
    pub username: String,
    /// Display name
    pub name: String,
}

impl PortalResource for UserInfo {
    const PATH: &'static str = "/api/user";
}

/// A scrapbook memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapbookEntry {
    /// Entry id
    pub id: i64,
    /// Title
    pub title: String,
    /// Body text
    pub content: String,
    /// Attached image
    #[serde(default)]
    pub image_url: Option<String>,
    /// Creation timestamp as sent by the backend
    #[serde(default)]
    pub created_at: Option<String>,
    /// Visible to everyone
    #[serde(default, alias = "public")]
    pub is_public: bool,
    /// Where the memory was made
    #[serde(default)]
    pub location: Option<String>,
    /// Author
    #[serde(default)]
    pub user: Option<UserInfo>,
}

/// Entries authored by the signed-in user (`/api/scrapbook/my-entries`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MyScrapbookEntries(pub Vec<ScrapbookEntry>);

impl PortalResource for MyScrapbookEntries {
    const PATH: &'static str = "/api/scrapbook/my-entries";
}

/// Entries shared publicly (`/api/scrapbook/public`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicScrapbookEntries(pub Vec<ScrapbookEntry>);

impl PortalResource for PublicScrapbookEntries {
    const PATH: &'static str = "/api/scrapbook/public";
}

/// Path that scrapbook entries are created under and deleted from.
pub const SCRAPBOOK_PATH: &str = "/api/scrapbook";

/// Every portal user, visible to admins only (`/api/users`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortalUsers(pub Vec<UserInfo>);

impl PortalResource for PortalUsers {
    const PATH: &'static str = "/api/users";
}

/// A hospital or clinic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthcareFacility {
    /// Facility id
    pub id: i64,
    /// Name
    pub name: String,
    /// Kind of facility, e.g. `Hospital`
    #[serde(rename = "type")]
    pub kind: String,
    /// Street address
    pub address: String,
    /// Phone number
    pub phone: String,
    /// Runs an emergency room
    pub emergency: bool,
    /// Current wait time
    pub wait_time: String,
    /// Medical specialties offered
    #[serde(default)]
    pub specialties: Vec<String>,
    /// Free capacity per unit, e.g. `beds: 75%`
    #[serde(default)]
    pub availability: BTreeMap<String, String>,
}

/// Ambulance fleet counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmbulanceFleet {
    /// Fleet size
    pub total: u32,
    /// Ready to dispatch
    pub available: u32,
    /// Currently on a call
    pub responding: u32,
}

/// Average and current emergency response times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseTimes {
    /// Rolling average
    pub average: String,
    /// Latest reading
    pub current: String,
}

/// Emergency service readiness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyServices {
    /// Ambulance counters
    pub ambulances: AmbulanceFleet,
    /// Response times
    pub response_time: ResponseTimes,
}

/// A public health program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthProgram {
    /// Program id
    pub id: i64,
    /// Title
    pub title: String,
    /// Description
    pub description: String,
    /// Date range
    pub date: String,
    /// Venue
    pub location: String,
}

/// Healthcare overview (`/api/healthcare`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthcareOverview {
    /// Facilities in the city
    #[serde(default)]
    pub facilities: Vec<HealthcareFacility>,
    /// Emergency service readiness
    pub emergency_services: EmergencyServices,
    /// Running programs
    #[serde(default)]
    pub health_programs: Vec<HealthProgram>,
}

impl PortalResource for HealthcareOverview {
    const PATH: &'static str = "/api/healthcare";
}

/// A staffed safety location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyZone {
    /// Zone id
    pub id: i64,
    /// Name
    pub name: String,
    /// Kind of zone, e.g. `Police`
    #[serde(rename = "type")]
    pub kind: String,
    /// Street address
    pub address: String,
    /// Operating status
    pub status: String,
    /// Facilities on site
    #[serde(default)]
    pub features: Vec<String>,
}

/// A helpline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyContact {
    /// Contact id
    pub id: i64,
    /// Name
    pub name: String,
    /// Phone number
    pub phone: String,
    /// When to call
    pub description: String,
}

/// A safety alert for a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyAlert {
    /// Alert id
    pub id: i64,
    /// Short title
    pub title: String,
    /// Where it applies
    pub location: String,
    /// Relative time
    pub time: String,
    /// Details
    pub description: String,
}

/// A monitored walking route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeRoute {
    /// Route id
    pub id: i64,
    /// Name
    pub name: String,
    /// Start
    pub start_point: String,
    /// End
    pub end_point: String,
    /// What makes the route safe
    #[serde(default)]
    pub safety_features: Vec<String>,
    /// Operating status
    pub status: String,
}

/// Public safety overview (`/api/safety`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyOverview {
    /// Staffed locations
    #[serde(default)]
    pub safety_zones: Vec<SafetyZone>,
    /// Helplines
    #[serde(default)]
    pub emergency_contacts: Vec<EmergencyContact>,
    /// Current alerts
    #[serde(default)]
    pub alerts: Vec<SafetyAlert>,
    /// Monitored routes
    #[serde(default)]
    pub safe_routes: Vec<SafeRoute>,
}

impl PortalResource for SafetyOverview {
    const PATH: &'static str = "/api/safety";
}

/// A WGS84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude
    pub lat: f64,
    /// Longitude
    pub lng: f64,
}

/// Rectangle covering the city.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapBounds {
    /// North-east corner
    pub northeast: GeoPoint,
    /// South-west corner
    pub southwest: GeoPoint,
}

/// A point of interest on the city map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapPoint {
    /// Point id
    pub id: i64,
    /// Name
    pub name: String,
    /// Category, e.g. `transit`
    pub category: String,
    /// Position
    pub location: GeoPoint,
    /// Street address
    pub address: String,
}

/// City map data (`/api/map`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityMap {
    /// Map extent
    pub city_bounds: MapBounds,
    /// Points of interest
    #[serde(default)]
    pub points: Vec<MapPoint>,
    /// Traffic overlays and whether each is on
    #[serde(default)]
    pub traffic_layers: BTreeMap<String, bool>,
    /// Safety overlays and whether each is on
    #[serde(default)]
    pub safety_layers: BTreeMap<String, bool>,
}

impl PortalResource for CityMap {
    const PATH: &'static str = "/api/map";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_city_stats_camel_case() {
        let stats: CityStats = serde_json::from_value(json!({
            "congestionLevel": "32%",
            "airQuality": "56",
            "emergencyResponseTime": "4.2",
            "activeVisitors": "9,482"
        }))
        .unwrap();
        assert_eq!(stats.congestion_level, "32%");
        assert_eq!(stats.active_visitors, "9,482");
    }

    #[test]
    fn test_unknown_alert_level_is_tolerated() {
        let alerts: Vec<EmergencyAlert> = serde_json::from_value(json!([
            {"id": 1, "title": "Road Closure", "time": "12m ago", "description": "Main St", "type": "danger"},
            {"id": 2, "title": "Drill", "time": "1h ago", "description": "Test", "type": "exercise"}
        ]))
        .unwrap();
        assert_eq!(alerts[0].level, AlertLevel::Danger);
        assert_eq!(alerts[1].level, AlertLevel::Unknown);
    }

    #[test]
    fn test_scrapbook_entry_accepts_public_alias() {
        let entry: ScrapbookEntry = serde_json::from_value(json!({
            "id": 3,
            "title": "Lingaraj Temple",
            "content": "Evening visit",
            "public": true,
            "user": {"id": 7, "username": "alice", "name": "Alice"}
        }))
        .unwrap();
        assert!(entry.is_public);
        assert_eq!(entry.user.unwrap().username, "alice");
        assert!(entry.image_url.is_none());
    }

    #[test]
    fn test_resource_paths() {
        assert_eq!(<Vec<EmergencyAlert>>::PATH, "/api/emergency-alerts");
        assert_eq!(MyScrapbookEntries::PATH, "/api/scrapbook/my-entries");
        assert_eq!(TrafficReport::PATH, "/api/traffic");
    }

    #[test]
    fn test_healthcare_overview_decodes_sparse_availability() {
        let overview: HealthcareOverview = serde_json::from_value(json!({
            "facilities": [{
                "id": 2,
                "name": "Community Health Center",
                "type": "Clinic",
                "address": "456 Oak Avenue",
                "phone": "(555) 987-6543",
                "emergency": false,
                "waitTime": "15 min",
                "specialties": ["Primary Care"],
                "availability": {"appointments": "40%"}
            }],
            "emergencyServices": {
                "ambulances": {"total": 12, "available": 8, "responding": 4},
                "responseTime": {"average": "8.5 min", "current": "7 min"}
            }
        }))
        .unwrap();

        assert_eq!(overview.facilities[0].kind, "Clinic");
        assert_eq!(
            overview.facilities[0].availability.get("appointments").map(String::as_str),
            Some("40%")
        );
        assert_eq!(overview.emergency_services.ambulances.available, 8);
        assert!(overview.health_programs.is_empty());
    }

    #[test]
    fn test_city_map_layers() {
        let map: CityMap = serde_json::from_value(json!({
            "cityBounds": {
                "northeast": {"lat": 40.7831, "lng": -73.9712},
                "southwest": {"lat": 40.6932, "lng": -74.0211}
            },
            "points": [{
                "id": 3,
                "name": "Metro Station",
                "category": "transit",
                "location": {"lat": 40.7359, "lng": -73.9911},
                "address": "Union Square"
            }],
            "trafficLayers": {"congestion": true, "construction": false}
        }))
        .unwrap();

        assert_eq!(map.points[0].category, "transit");
        assert_eq!(map.traffic_layers.get("construction"), Some(&false));
        assert!(map.safety_layers.is_empty());
    }

    #[test]
    fn test_safety_overview_routes() {
        let safety: SafetyOverview = serde_json::from_value(json!({
            "safeRoutes": [{
                "id": 1,
                "name": "Downtown to University",
                "startPoint": "Downtown Transit Hub",
                "endPoint": "University Main Entrance",
                "safetyFeatures": ["Regular Patrols"],
                "status": "Active"
            }]
        }))
        .unwrap();

        assert_eq!(safety.safe_routes[0].end_point, "University Main Entrance");
        assert!(safety.safety_zones.is_empty());
        assert_eq!(PortalUsers::PATH, "/api/users");
    }
}
