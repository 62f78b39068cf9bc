pub mod addressing {
    pub mod frame_address;
}

pub mod detection {
    pub mod domain {
        pub mod consecutive_frame_filter;
        pub mod face_detector;
        pub mod face_extraction_stage;
        pub mod label_map;
        pub mod object_detection_stage;
        pub mod object_detector;
    }
    pub mod infrastructure;
}

pub mod imaging {
    pub mod domain {
        pub mod image_source;
    }
    pub mod infrastructure {
        pub mod file_image_source;
    }
}

pub mod recognition {
    pub mod domain {
        pub mod face_encoder;
        pub mod face_identity_stage;
        pub mod face_quality_gate;
        pub mod identity_classifier;
    }
    pub mod infrastructure {
        pub mod linear_identity_classifier;
        pub mod onnx_face_encoder;
    }
}

pub mod pipeline {
    pub mod batch_stats;
    pub mod detect_faces_use_case;
    pub mod detect_objects_use_case;
    pub mod pipeline_orchestrator;
    pub mod infrastructure {
        pub mod pipeline_factory;
        pub mod request_dispatcher;
    }
}

pub mod shared {
    pub mod backend;
    pub mod bounding_box;
    pub mod config;
    pub mod constants;
    pub mod frame;
    pub mod image_result;
    pub mod onnx_session;
}
