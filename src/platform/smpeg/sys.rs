//! Raw declarations for the smpeg2 C API (`smpeg.h`).

#![allow(non_camel_case_types, non_snake_case)]

use std::ffi::{c_char, c_double, c_float, c_int, c_uint, c_void};

use sdl2::sys::{SDL_AudioSpec, SDL_RWops, SDL_mutex};

/// Opaque decoder handle.
#[repr(C)]
pub struct SMPEG {
    _opaque: [u8; 0],
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct SMPEG_Info {
    pub has_audio: c_int,
    pub has_video: c_int,
    pub width: c_int,
    pub height: c_int,
    pub current_frame: c_int,
    pub current_fps: c_double,
    pub audio_string: [c_char; 80],
    pub audio_current_frame: c_int,
    pub current_offset: u32,
    pub total_size: u32,
    pub current_time: c_double,
    pub total_time: c_double,
}

#[repr(C)]
#[derive(Debug)]
pub struct SMPEG_Frame {
    pub w: c_uint,
    pub h: c_uint,
    pub image_width: c_uint,
    pub image_height: c_uint,
    pub image: *mut u8,
}

/// `-1` error, `0` stopped, `1` playing.
pub type SMPEGstatus = c_int;

pub type SMPEG_DisplayCallback = Option<unsafe extern "C" fn(data: *mut c_void, frame: *mut SMPEG_Frame)>;

#[link(name = "smpeg2")]
unsafe extern "C" {
    pub fn SMPEG_new(file: *const c_char, info: *mut SMPEG_Info, sdl_audio: c_int) -> *mut SMPEG;
    pub fn SMPEG_new_descr(file: c_int, info: *mut SMPEG_Info, sdl_audio: c_int) -> *mut SMPEG;
    pub fn SMPEG_new_data(
        data: *mut c_void,
        size: c_int,
        info: *mut SMPEG_Info,
        sdl_audio: c_int,
    ) -> *mut SMPEG;
    pub fn SMPEG_new_rwops(
        src: *mut SDL_RWops,
        info: *mut SMPEG_Info,
        freesrc: c_int,
        sdl_audio: c_int,
    ) -> *mut SMPEG;

    pub fn SMPEG_getinfo(mpeg: *mut SMPEG, info: *mut SMPEG_Info);
    pub fn SMPEG_enableaudio(mpeg: *mut SMPEG, enable: c_int);
    pub fn SMPEG_enablevideo(mpeg: *mut SMPEG, enable: c_int);
    pub fn SMPEG_delete(mpeg: *mut SMPEG);
    pub fn SMPEG_status(mpeg: *mut SMPEG) -> SMPEGstatus;
    pub fn SMPEG_setvolume(mpeg: *mut SMPEG, volume: c_int);
    pub fn SMPEG_setdisplay(
        mpeg: *mut SMPEG,
        callback: SMPEG_DisplayCallback,
        data: *mut c_void,
        lock: *mut SDL_mutex,
    );
    pub fn SMPEG_loop(mpeg: *mut SMPEG, repeat: c_int);
    pub fn SMPEG_play(mpeg: *mut SMPEG);
    pub fn SMPEG_pause(mpeg: *mut SMPEG);
    pub fn SMPEG_stop(mpeg: *mut SMPEG);
    pub fn SMPEG_rewind(mpeg: *mut SMPEG);
    pub fn SMPEG_seek(mpeg: *mut SMPEG, bytes: c_int);
    pub fn SMPEG_skip(mpeg: *mut SMPEG, seconds: c_float);
    pub fn SMPEG_renderFrame(mpeg: *mut SMPEG, framenum: c_int);
    pub fn SMPEG_renderFinal(mpeg: *mut SMPEG);
    pub fn SMPEG_error(mpeg: *mut SMPEG) -> *mut c_char;

    pub fn SMPEG_playAudio(mpeg: *mut SMPEG, stream: *mut u8, len: c_int) -> c_int;
    pub fn SMPEG_playAudioSDL(mpeg: *mut c_void, stream: *mut u8, len: c_int);
    pub fn SMPEG_wantedSpec(mpeg: *mut SMPEG, wanted: *mut SDL_AudioSpec) -> c_int;
    pub fn SMPEG_actualSpec(mpeg: *mut SMPEG, spec: *mut SDL_AudioSpec);
}
