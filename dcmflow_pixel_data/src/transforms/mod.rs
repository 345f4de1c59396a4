pub mod p10_pixel_data_frame_transform;
