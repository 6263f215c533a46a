//! Sustained look-away monitoring: per-frame face detections in, debounced
//! incidents out.

pub mod shared {
    pub mod bounding_box;
    pub mod constants;
    pub mod frame;
    pub mod monitor_config;
    pub mod video_metadata;
}

pub mod detection {
    pub mod domain {
        pub mod face_detector;
        pub mod frame_observation;
    }
    pub mod infrastructure;
}

pub mod tracking {
    pub mod domain {
        pub mod handle_arena;
        pub mod position_smoother;
        pub mod subject_associator;
        pub mod subject_state;
        pub mod subject_tracker;
    }
    pub mod infrastructure;
}

pub mod classification {
    pub mod domain {
        pub mod direction;
        pub mod violation_classifier;
    }
}

pub mod incident {
    pub mod domain {
        pub mod incident;
        pub mod incident_debouncer;
        pub mod incident_log;
        pub mod incident_sink;
        pub mod snapshot_store;
    }
    pub mod infrastructure;
}

pub mod video {
    pub mod domain {
        pub mod frame_source;
    }
    pub mod infrastructure;
}

pub mod pipeline {
    pub mod monitor_engine;
    pub mod monitor_executor;
    pub mod monitor_logger;
    pub mod monitor_session_use_case;
    pub mod infrastructure {
        pub mod threaded_monitor_executor;
    }
}
