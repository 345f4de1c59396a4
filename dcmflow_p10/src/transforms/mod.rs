pub mod p10_filter_transform;
