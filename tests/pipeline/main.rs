mod fixture;
mod lower;
mod print;
mod serialize;
