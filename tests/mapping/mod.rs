mod accessors;
mod config;
mod narrowing;
