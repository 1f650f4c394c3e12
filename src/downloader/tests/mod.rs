use super::test_helpers::*;
use super::*;
use crate::db::JobUpdate;
use crate::error::{FetchError, JobError};
use crate::fetch::{FetchOutcome, ProgressEvent};
use crate::types::{Event, JobStatus};
use std::time::Duration;

mod dispatch;
