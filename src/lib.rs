pub mod annotate;
pub mod assets;
pub mod config;
pub mod event_report;
pub mod http_client;
pub mod json_tree;
pub mod logging;
pub mod matching;
pub mod milestone_report;
pub mod render;
pub mod report;
pub mod rewards;
pub mod shop;
pub mod showdown_report;
pub mod tournament_report;
pub mod translation;
pub mod world_records;
