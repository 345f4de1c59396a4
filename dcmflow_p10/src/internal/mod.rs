pub mod byte_sink;
pub mod byte_stream;
pub mod data_element_header;
pub mod p10_location;
pub mod value_length;
