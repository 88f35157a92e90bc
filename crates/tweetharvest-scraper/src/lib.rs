pub mod chromium;
pub mod collector;
pub mod counts;
pub mod error;
pub mod extract;
pub mod feed;
pub mod login;
pub mod pacing;
pub mod session;
pub mod surface;
pub mod traversal;

pub use chromium::{BrowserOptions, ChromiumSurface};
pub use collector::{
    collect, Collection, CollectionOutcome, CollectionSession, CollectPlan, CollectorLimits,
    RecordFilter,
};
pub use counts::parse_count;
pub use error::ScraperError;
pub use extract::{extract_record, status_id};
pub use feed::{open_feed, FeedTarget};
pub use login::{establish_session, LoginOptions, LoginState};
pub use pacing::Pacer;
pub use session::{SessionBlob, SessionStore, StoredCookie};
pub use surface::{RenderSurface, RenderedItem, SurfaceError};
pub use traversal::{
    harvest_engagement, harvest_thread, EngagementHarvest, ThreadHarvest, TraversalOptions,
};
