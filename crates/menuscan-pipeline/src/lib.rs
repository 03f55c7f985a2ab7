// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// menuscan-pipeline. Runs one menu photo through every stage and always
// answers with a `PipelineResult`.

pub mod coordinator;

pub use coordinator::MenuPipeline;
