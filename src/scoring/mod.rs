pub mod bm_25;
