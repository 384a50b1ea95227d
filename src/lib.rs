/*!
# Survey Dashboard

Statistics server and dashboard client for a survey on artificial intelligence
in Italian education, answered by students and teachers.

## Overview

The server imports the two questionnaire exports (CSV), computes descriptive
and inferential statistics and serves them as JSON. The client loads the
dashboard payloads with retry and cancellation and draws the charts as SVG.

## Architecture

### Statistics Layer
- **dataset** / **importer**: typed survey records read from CSV
- **questions**: the questionnaire catalogue and its classification
- **stats**: means with Student t confidence intervals, quartiles, Pearson
  and Spearman correlations
- **analytics**: the payloads of every endpoint, built from a dataset

### Server Layer
- **app**: axum routes, CORS, request logging
- **cache**: TTL cache of computed responses, cleared on import
- **session**: Argon2 editor password and session tokens
- **snapshot**: gzip + bincode persistence of the imported dataset
- **export**: CSV and XLSX downloads

### Presentation Layer
- **client**: reqwest client of the API, validating every payload
- **loader**: health check, one-time import and concurrent loading with retry
- **graph**: error-bar chart, correlation heatmap and box plot (plotters SVG)

## REST API Endpoints

- `/health` - Counts of imported responses
- `/api/import` - Re-import the CSV exports
- `/api/students`, `/api/teachers`, `/api/comparison`, `/api/tools` - Dashboard payloads
- `/api/statistics/comparison-with-ci`, `/api/statistics/correlation-matrix/{type}` - Inferential statistics
- `/api/questions/{type}/{column}/stats` - Per-question statistics
- `/api/homepage`, `/api/login`, `/api/logout` - Editable homepage
- `/charts/...` - Server-rendered SVG charts
- `/api/export/...` - CSV and XLSX downloads
*/

pub mod analytics;
pub mod cache;
pub mod config;
pub mod dataset;
pub mod error;
pub mod export;
pub mod graph;
pub mod importer;
pub mod model;
pub mod questions;
pub mod session;
pub mod snapshot;
pub mod stats;

#[cfg(feature = "web")]
pub mod app;
#[cfg(feature = "web")]
pub mod client;
#[cfg(feature = "web")]
pub mod loader;

pub use error::{DashboardError, Result};
