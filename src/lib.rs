//! Cliente de asistencia visual.
//!
//! Toma frames (cámara o imágenes), los envía a un servidor de inferencia
//! remoto y reparte el resultado entre el overlay y la cola de narración.
//! Arquitectura hexagonal: `domain` (reglas puras), `application` (casos de
//! uso y puertos) y `adapters` (HTTP, procesos, disco, cámara).

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
