// Copyright (c) 2026 Noderegistry
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The HTTP surface: the external collaborator §1 scopes out of the core,
//! wired to it here.

pub mod dto;
pub mod routes;
pub mod server;

pub use routes::AppState;
pub use server::{build_router, serve};
