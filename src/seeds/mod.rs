pub mod name_pool_seed;
