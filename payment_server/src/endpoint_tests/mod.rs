mod helpers;
mod orders;
mod payment;
mod webhook;
