pub mod ccc;
