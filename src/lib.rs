// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod aggregate;
pub mod alerts;
pub mod budget;
pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod models;
pub mod normalize;
pub mod session;
pub mod store;
pub mod trend;
pub mod utils;
