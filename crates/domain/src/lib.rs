//! City Portal Domain - Core session and portal types
//!
//! This crate defines the domain model for the City Portal client.
//! All types here are pure Rust with no I/O dependencies.

pub mod credential;
pub mod error;
pub mod payload;
pub mod request;
pub mod resources;
pub mod response;
pub mod route;
pub mod scope;
pub mod session;

pub use credential::{
    ADMIN_ROLE_MARKER, AccessToken, CredentialRecord, DEFAULT_TOKEN_SCHEME, Role, UserProfile,
};
pub use error::{DomainError, DomainResult};
pub use payload::{LoginRequest, LoginResponse, NewScrapbookEntry, RegisterRequest};
pub use request::{HttpMethod, HttpRequest};
pub use resources::{
    Activity, AlertLevel, AmbulanceFleet, CityMap, CityService, CityStats, EmergencyAlert,
    EmergencyContact, EmergencyServices, GeoPoint, HealthProgram, HealthcareFacility,
    HealthcareOverview, MapBounds, MapPoint, MyScrapbookEntries, PortalResource, PortalUsers,
    PublicScrapbookEntries, ResponseTimes, SCRAPBOOK_PATH, SafeRoute, SafetyAlert, SafetyOverview,
    SafetyZone, ScrapbookEntry, TrafficFlowPoint, TrafficIncident, TrafficReport, UserInfo,
};
pub use response::{HttpResponse, StatusCode};
pub use route::{AccessRequirement, GuardDecision, LOGIN_VIEW, PORTAL_ROUTES, PortalRoute};
pub use scope::BackendScope;
pub use session::{SessionSnapshot, SessionState};
