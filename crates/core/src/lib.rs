//! Resolution upscaling for video files.
//!
//! A job extracts the source's audio, probes its frame rate and size,
//! resamples every frame to the requested resolution into a silent
//! intermediate, then remuxes the audio back on. Intermediates are removed
//! whether the job succeeds or not.

pub mod job {
    pub mod domain {
        pub mod job;
        pub mod job_paths;
        pub mod temp_file_janitor;
    }
}

pub mod pipeline {
    pub mod pipeline_error;
    pub mod pipeline_logger;
    pub mod resample_frames_use_case;
    pub mod upscale_config;
    pub mod upscale_video_use_case;

    pub mod infrastructure {
        pub mod upscale_worker;
    }
}

pub mod resampling {
    pub mod domain {
        pub mod frame_resampler;
        pub mod frame_resizer;
    }

    pub mod infrastructure {
        pub mod cubic_frame_resizer;
    }
}

pub mod shared {
    pub mod constants;
    pub mod dimensions;
    pub mod frame;
    pub mod size_token;
    pub mod video_metadata;
}

pub mod video {
    pub mod domain {
        pub mod audio_extractor;
        pub mod media_probe;
        pub mod remuxer;
        pub mod video_codec;
        pub mod video_reader;
        pub mod video_writer;
    }

    pub mod infrastructure {
        pub mod ffmpeg_audio_extractor;
        pub mod ffmpeg_probe;
        pub mod ffmpeg_reader;
        pub mod ffmpeg_remuxer;
        pub mod ffmpeg_writer;
    }
}

#[cfg(test)]
mod test_support;
