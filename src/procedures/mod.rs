/*!
The procedures of a solve, factored one file per rule family.

The [outer driver](solve) runs the kernel loop — propagate, honor assumptions, relay
assignments to the theory stores, decide — and calls the
[final-check cascade](final_check) when the assignment is complete.

Within one final-check round the cascade order is authoritative: the cascade returns
[Continue](final_check::FinalCheckOutcome::Continue) as soon as any rule fires, and no
rule may preempt a later one otherwise.
Between rounds the kernel's decisions and propagations are free to reorder arbitrarily;
soundness rests exclusively on dependency bookkeeping, never on evaluation order.
*/

pub mod branching;
pub mod contains;
pub mod eqs;
pub mod extensionality;
pub mod final_check;
pub mod lengths;
pub mod nqs;
pub mod orderings;
pub mod solve;
