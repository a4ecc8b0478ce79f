// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! This module holds configuration and constants shared between the reporter
//! components.

pub(crate) mod configuration;
pub(crate) mod constants;
