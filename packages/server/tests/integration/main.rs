mod common;
mod problem;
mod submission;
