/*! Test coverage for the kernel IR and the alloca analyses.
 *
 * The analyses are only as good as the CFG facts under them, so these tests walk from builder and
 * CFG basics through regions up to full AllocaSSA runs on diamond and loop shaped kernels.
 */

#![allow(unused_imports)]
#![allow(unused_variables)]
#![allow(unused_must_use)]

mod builder_api_tests;
mod region_tests;
