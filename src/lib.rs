pub mod yearsort_core;
