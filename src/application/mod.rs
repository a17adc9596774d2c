pub mod charging;
