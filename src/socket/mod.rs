/*! Communication between endpoints.

The `socket` module deals with the router discovery conversation itself: a
[Session](ndisc::Session) sends Router Solicitations, backs off between
them, and turns the Router Advertisements it is fed into observer events.
*/

pub mod ndisc;
