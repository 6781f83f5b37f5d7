// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Data models for boxes, classes and projects.

pub mod annotation;
pub mod classes;
pub mod grabber;
pub mod project;
