mod availability;
mod common;
mod management;
