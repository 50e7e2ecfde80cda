//! RankPay Rewards Backend Library
//!
//! Core modules of the reward & ranking assignment/redemption engine.

pub mod analytics_service;
pub mod app_state;
pub mod assignment_service;
pub mod audit;
pub mod catalog_service;
pub mod error;
pub mod handlers;
pub mod ledger;
pub mod models;
pub mod reward;
pub mod routes;
pub mod settings;
pub mod settings_service;
pub mod users;
