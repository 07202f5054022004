pub mod delegate;
pub mod lyrics;
pub mod spotify;
pub mod web;

pub use delegate::DelegateTool;
pub use lyrics::GeniusLyricsTool;
pub use spotify::spotify_tools;
pub use web::WebSearchTool;
